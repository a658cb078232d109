pub mod api;
pub mod dto;
pub mod entities;
pub mod error;
pub mod executable_utils;
pub mod model;
pub mod seed;
pub mod service;
pub mod storage;
