// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP

#![forbid(unsafe_code)]

mod cli;
mod emit;
mod error;
mod graph;
mod image;
mod model;
mod parser;
mod schedule;
mod walk;

pub use cli::{level_filter, run, Args, Config};
pub use emit::emit;
pub use error::*;
pub use graph::{build, Diagnostic, ExternalKind, ExternalNode, Graph, InternalNode};
pub use image::ImageRef;
pub use model::{EdgeKind, RawEdge, Stage};
pub use parser::{classify, parse_file, ClassifiedLine, FileParse, ParseWarning, StageIntro};
pub use schedule::{schedule, Batch};
pub use walk::{walk, Corpus};
