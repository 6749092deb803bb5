pub mod mapper;
pub mod memory_repo;
pub mod sheets_repo;


pub use memory_repo::InMemoryRegistrationRepository;
pub use sheets_repo::SheetsRegistrationRepository;
