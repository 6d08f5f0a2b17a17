//! Front-ends that drive the codec on behalf of the command line tools.

pub mod metadata;
