//! UI module - reusable widgets shared by the section views

pub mod components;
