// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP

pub mod classify;
pub mod file;

pub use classify::{classify, ClassifiedLine, StageIntro};
pub use file::{parse_file, FileParse, ParseWarning};
