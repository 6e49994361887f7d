// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete [`strongbox_domain::adapter::RawStorage`] backends and the
//! generic pipeline that turns any of them into a full
//! [`strongbox_domain::adapter::StorageAdapter`].

pub mod memory;
pub mod pipeline;
pub mod sql;

pub use memory::MemoryStorage;
pub use pipeline::PipelineAdapter;
pub use sql::{SqlStorage, SqlStorageStats};
