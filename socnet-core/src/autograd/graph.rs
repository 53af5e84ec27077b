use crate::tensor::Tensor;
use std::collections::HashSet;

/// Stable identity of a tensor node: the address of its shared interior.
pub type NodeId = usize;

/// Topological sort of the computation graph reachable from `root`.
///
/// Returns nodes leaves-first, root last. `Tensor::backward` walks the result
/// in reverse so every node's gradient is fully accumulated before the node's
/// own `grad_fn` fires.
pub(crate) fn topological_sort(root: &Tensor) -> Vec<Tensor> {
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut sorted: Vec<Tensor> = Vec::new();
    visit(root, &mut visited, &mut sorted);
    sorted
}

fn visit(node: &Tensor, visited: &mut HashSet<NodeId>, sorted: &mut Vec<Tensor>) {
    if !visited.insert(node.node_id()) {
        return;
    }
    if let Some(grad_fn) = node.grad_fn() {
        for input in grad_fn.inputs() {
            visit(&input, visited, sorted);
        }
    }
    sorted.push(node.clone());
}
