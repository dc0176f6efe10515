//! Request and response models for the journal API
//!
//! DTOs for serializing/deserializing HTTP request and response bodies.
//! Backend rows live in [`crate::store`].

pub mod requests;
pub mod responses;

pub use requests::{
    CreateAnniversaryRequest, CreateLetterRequest, CreateMemoryRequest, LoginRequest,
};
pub use responses::{
    CacheStatsResponse, HealthResponse, MemoryView, SessionInfo, SessionResponse, SuccessResponse,
};
