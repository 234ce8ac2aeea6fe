pub mod generation_task_repo;

pub use generation_task_repo::GenerationTaskRepo;
