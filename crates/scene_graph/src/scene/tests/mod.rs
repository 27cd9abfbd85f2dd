//! Cross-module scenarios for the transform hierarchy
//!
//! Unit tests live beside each module; these exercise several of them
//! together the way an application would.

mod cloning;
