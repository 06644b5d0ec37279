pub mod index_chunks_route;
pub mod index_request;
