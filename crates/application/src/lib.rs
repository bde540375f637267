#![forbid(unsafe_code)]

pub mod event_feed_impl;
