pub mod answer_grid_reader;
pub mod bubble_reader;
pub mod coordinate_mapper;
pub mod grid_decoder;
pub mod scoring;

pub use answer_grid_reader::AnswerGridReader;
pub use bubble_reader::DecodePolicy;
pub use coordinate_mapper::{BubbleRect, CoordinateMapper, GridKind};
pub use grid_decoder::GridDecoder;
pub use scoring::ScoringEngine;
