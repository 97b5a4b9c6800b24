// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Site accessibility classifier and menu extractor.
//!
//! [`services::pipeline::AnalysisPipeline`] runs one analysis and returns a
//! [`models::report::SiteReport`]; [`app`] exposes the same over HTTP.

pub mod app;
pub mod models;
pub mod routes;
pub mod services;
