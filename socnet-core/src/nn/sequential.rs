use crate::error::SocNetError;
use crate::nn::module::Module;
use crate::nn::parameter::SharedParam;
use crate::tensor::Tensor;

/// Ordered container of modules applied one after the other.
///
/// Modules are stored with a name for parameter reporting. Parameter-carrying
/// modules also form the "layer" index space used by layer-selective noise:
/// layer 0 is the first module that owns parameters, layer 1 the second, and
/// so on, regardless of parameter-free activations in between.
#[derive(Debug, Default)]
pub struct Sequential {
    modules: Vec<(String, Box<dyn Module>)>,
}

impl Sequential {
    pub fn new() -> Self {
        Sequential {
            modules: Vec::new(),
        }
    }

    pub fn add_module(&mut self, name: &str, module: Box<dyn Module>) {
        self.modules.push((name.to_string(), module));
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Number of parameter-carrying layers.
    pub fn num_layers(&self) -> usize {
        self.modules
            .iter()
            .filter(|(_, m)| !m.parameters().is_empty())
            .count()
    }

    /// Parameters of the `index`-th parameter-carrying layer.
    pub fn layer_parameters(&self, index: usize) -> Result<Vec<SharedParam>, SocNetError> {
        let mut seen = 0;
        for (_, module) in &self.modules {
            let params = module.parameters();
            if params.is_empty() {
                continue;
            }
            if seen == index {
                return Ok(params);
            }
            seen += 1;
        }
        Err(SocNetError::IndexOutOfBounds {
            index,
            len: seen,
        })
    }
}

impl Module for Sequential {
    fn forward(&self, input: &Tensor) -> Result<Tensor, SocNetError> {
        let mut current = input.clone();
        for (_, module) in &self.modules {
            current = module.forward(&current)?;
        }
        Ok(current)
    }

    fn parameters(&self) -> Vec<SharedParam> {
        self.modules
            .iter()
            .flat_map(|(_, m)| m.parameters())
            .collect()
    }

    fn named_parameters(&self) -> Vec<(String, SharedParam)> {
        let mut out = Vec::new();
        for (name, module) in &self.modules {
            for (pname, param) in module.named_parameters() {
                out.push((format!("{}.{}", name, pname), param));
            }
        }
        out
    }
}
