//! Domain types shared by the fetch, transform, render and export stages.

pub mod bar;

pub use bar::Bar;
