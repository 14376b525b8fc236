pub mod exiftool_writer;
pub mod tool_installer;
