pub mod onnx_face_detector;
pub mod qr_barcode_detector;
pub mod replay_detector;
