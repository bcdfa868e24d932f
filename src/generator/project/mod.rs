mod generate;

pub use generate::{
    check, generate_from_ast, generate_service_files, FileReport, FileStatus, GenerateOptions,
    GenerationReport, GenerationScope,
};
