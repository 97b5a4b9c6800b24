// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod analyze;
pub mod config;
pub mod error;
pub mod report;
pub mod robots;
pub mod version;
