//! Error taxonomy shared by the pipeline, the drawables and the loaders.
//!
//! None of these are recovered from inside a frame: they propagate up to the
//! application shell, which stops rendering and reports them.

use std::fmt;

use crate::pipeline::Attribute;

/// Shader stage a build failure was reported for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    /// Linking or pipeline creation, after both stages compiled.
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
            ShaderStage::Link => f.write_str("link"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A vertex attribute array has the wrong shape for its component count,
    /// disagrees with the position count, or is empty.
    MalformedVertexData {
        attribute: &'static str,
        reason: String,
    },
    /// A pop was issued on an attribute stack with nothing saved on it.
    StackUnderflow { attribute: Attribute },
    /// A state change or draw was issued with no program bound.
    NoActiveProgram,
    /// A shader, texture or other file could not be fetched or decoded.
    ResourceLoadFailure { resource: String, reason: String },
    /// The bound program does not expose a uniform the pipeline had to write.
    MissingUniform { name: String },
    /// The backend refused to compile or link a program.
    ShaderBuild { stage: ShaderStage, log: String },
}

impl Error {
    pub(crate) fn malformed(attribute: &'static str, reason: impl Into<String>) -> Self {
        Error::MalformedVertexData {
            attribute,
            reason: reason.into(),
        }
    }

    pub(crate) fn resource(resource: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::ResourceLoadFailure {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedVertexData { attribute, reason } => {
                write!(f, "malformed vertex data in '{attribute}': {reason}")
            }
            Error::StackUnderflow { attribute } => {
                write!(f, "pop on empty {attribute} stack")
            }
            Error::NoActiveProgram => f.write_str("no shader program is bound"),
            Error::ResourceLoadFailure { resource, reason } => {
                write!(f, "could not load '{resource}': {reason}")
            }
            Error::MissingUniform { name } => {
                write!(f, "uniform '{name}' is not exposed by the bound program")
            }
            Error::ShaderBuild { stage, log } => {
                write!(f, "shader {stage} stage failed:\n{log}")
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
