// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Code generation backends.
//!
//! **DDD Context:** Compilation — Code Generation
//!
//! - [`csharp`] - VBScript to C# against the runtime compat layer

pub mod csharp;
