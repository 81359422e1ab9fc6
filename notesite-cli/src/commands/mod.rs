//! CLI command implementations.

pub mod build;
pub mod dev;
pub mod init;
pub mod page;
pub mod search;
pub mod verify;

pub use build::build_site;
pub use dev::dev_server;
pub use init::init_project;
pub use page::show_page;
pub use search::search_site;
pub use verify::verify_site;
