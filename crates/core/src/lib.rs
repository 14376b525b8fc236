pub mod shared {
    pub mod config;
    pub mod constants;
    pub mod error;
}

pub mod process {
    pub mod domain {
        pub mod command_runner;
    }
    pub mod infrastructure;
}

pub mod recognition {
    pub mod domain {
        pub mod face_recognizer;
        pub mod inference_result;
    }
    pub mod infrastructure;
}

pub mod tagging {
    pub mod domain {
        pub mod metadata_writer;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod pipeline_logger;
    pub mod process_directory_use_case;
    pub mod processing_summary;
    pub mod tag_image_use_case;
    pub mod train_model_use_case;
}
