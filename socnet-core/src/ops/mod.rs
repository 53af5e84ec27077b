pub mod activation;
pub mod arithmetic;
pub mod linalg;
pub mod reduction;
pub mod view;
