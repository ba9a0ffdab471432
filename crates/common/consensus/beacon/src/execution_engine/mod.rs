pub mod engine_trait;
pub mod mock_engine;
