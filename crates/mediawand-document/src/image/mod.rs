// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decode, orient, resize, flatten, encode, and montage.

pub mod encode;
pub mod geometry;
pub mod montage;
pub mod processor;

pub use processor::ImageProcessor;
