//! Scene errors

use crate::stage::EntityId;
use cartesia_animation::TimelineError;
use cartesia_core::{GeometryError, ReactiveError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("entity {0:?} does not exist")]
    MissingEntity(EntityId),
    #[error("entity {id:?} is a {actual}, not a {expected}")]
    WrongShape {
        id: EntityId,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("frame sink rejected frame {frame}: {message}")]
    Sink { frame: u64, message: String },
    #[error(transparent)]
    Reactive(#[from] ReactiveError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

impl From<SceneError> for TimelineError {
    fn from(err: SceneError) -> Self {
        match err {
            SceneError::Reactive(err) => TimelineError::Reactive(err),
            SceneError::Geometry(err) => TimelineError::Geometry(err),
            SceneError::Timeline(err) => err,
            other => TimelineError::Aborted(other.to_string()),
        }
    }
}
