// Classification pipeline: per-frame detection driving the copy decision

pub mod classifier;
pub mod detection;
pub mod walker;
