pub mod init;
pub mod layers;
pub mod module;
pub mod parameter;
pub mod sequential;

pub use layers::{Linear, Relu, Sigmoid, Tanh};
pub use module::Module;
pub use parameter::{param_key, Parameter, SharedParam};
pub use sequential::Sequential;
