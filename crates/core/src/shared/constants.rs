pub const DEFAULT_TRAINING_DIR: &str = "./training_images";
pub const DEFAULT_MODEL_PATH: &str = "./face_model.pkl";

/// Maximum face distance still counted as a match (lower is stricter).
pub const DEFAULT_TOLERANCE: f64 = 0.6;

pub const EXTRACTOR_INTERPRETER: &str = "python3";
pub const EXTRACTOR_SCRIPT: &str = "facial_recognition.py";
pub const WRITER_PROGRAM: &str = "exiftool";

/// Metadata fields receiving recognized names, in write order.
pub const TAG_FIELDS: &[&str] = &["Keywords", "Subject", "XMP-iptcExt:PersonInImage"];

pub const CONFIG_DIR_NAME: &str = "FaceTagger";
pub const CONFIG_FILE_NAME: &str = "config.json";
