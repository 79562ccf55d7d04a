pub mod fec;

pub use fec::{Envelope, FecApi, FecCandidate, FecCommittee, FecReceipt};
