// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod browser;
pub mod extractor;
pub mod feeds;
pub mod fetcher;
pub mod html;
pub mod http_client;
pub mod logging;
pub mod pipeline;
pub mod render_mode;
pub mod robots;
pub mod summary;
