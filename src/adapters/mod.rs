pub mod fetch;
pub mod http;
pub mod imaging;
pub mod onnx;
