pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod etl;
pub mod migrate;
pub mod provision;
pub mod verify;

pub use db::FinanceStore;
pub use error::FinflowError;
pub use provision::Provisioner;
