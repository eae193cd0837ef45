// SPDX-License-Identifier: AGPL-3.0-or-later
// SochDB - LLM-Optimized Embedded Database
// Copyright (C) 2026 Sushanth Reddy Vanagala (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Selection to sequence translation
//!
//! Used when the driver has no native selection primitive. Each
//! `(mem_space, file_space)` pair is walked in lockstep: both selections
//! are turned into sequence lists of contiguous byte runs, refilled
//! `seq_list_len` runs at a time, and merged into segments whose length is
//! the shorter of the two current runs.
//!
//! ```text
//! file runs   |----8----|  |--4--|     |----8----|
//! mem runs    |------12-------|  |-------12-------|
//! segments    |----8----|  |-4-|        ...
//! ```
//!
//! Segments become either one scalar driver call each, or a single batched
//! vector call when the driver supports it.

use std::ops::Range;
use std::sync::Arc;

use vfdio_core::telemetry::{self, IoModes};
use vfdio_core::{
    Addr, FileDriver, MemType, Result, RunList, ScratchVec, SeqList, Selection, VfdError,
    LOCAL_VECTOR_LEN,
};

use crate::vector::record_scalar_fallback;

/// One contiguous transfer between a file range and a buffer range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment {
    /// Absolute file address
    pub addr: Addr,
    pub len: usize,
    /// Index of the caller buffer the segment lands in
    pub buf: usize,
    /// Byte offset inside that buffer
    pub mem_offset: u64,
}

/// A resolved selection request
pub(crate) struct SelectionBatch<'a> {
    pub mem_spaces: &'a [Arc<dyn Selection>],
    pub file_spaces: &'a [Arc<dyn Selection>],
    /// Absolute file offsets
    pub offsets: &'a [Addr],
    pub element_sizes: &'a RunList<usize>,
    /// Buffer index each request reads from or writes to
    pub buf_sources: &'a RunList<usize>,
}

impl SelectionBatch<'_> {
    #[inline]
    fn count(&self) -> usize {
        self.offsets.len()
    }
}

/// Receives merged segments in generation order
pub(crate) trait SegmentSink {
    fn segment(&mut self, segment: Segment) -> Result<()>;
}

/// Walk every selection pair of the batch into `sink`
pub(crate) fn merge_selections(
    batch: &SelectionBatch<'_>,
    seq_list_len: usize,
    sink: &mut dyn SegmentSink,
) -> Result<()> {
    for i in 0..batch.count() {
        let element_size = batch.element_sizes.get(i).unwrap_or_default();
        let buf = batch.buf_sources.get(i).unwrap_or_default();
        merge_pair(
            &*batch.file_spaces[i],
            &*batch.mem_spaces[i],
            batch.offsets[i],
            element_size,
            buf,
            seq_list_len,
            sink,
        )?;
    }
    Ok(())
}

fn merge_pair(
    file_space: &dyn Selection,
    mem_space: &dyn Selection,
    offset: Addr,
    element_size: usize,
    buf: usize,
    seq_list_len: usize,
    sink: &mut dyn SegmentSink,
) -> Result<()> {
    let file_elements = file_space.element_count();
    let mem_elements = mem_space.element_count();
    if file_elements != mem_elements {
        return Err(VfdError::mismatched(format!(
            "file selection has {} elements, memory selection {}",
            file_elements, mem_elements
        )));
    }

    let mut file_iter = file_space.iter(element_size)?;
    let mut mem_iter = mem_space.iter(element_size)?;
    let mut file_runs = SeqList::new();
    let mut mem_runs = SeqList::new();
    let (mut fi, mut mi) = (0usize, 0usize);
    let (mut file_used, mut mem_used) = (0usize, 0usize);

    loop {
        if fi == file_runs.len() {
            file_runs.clear();
            fi = 0;
            file_iter.next_runs(seq_list_len, &mut file_runs)?;
            if file_runs.is_empty() {
                break;
            }
        }
        if mi == mem_runs.len() {
            mem_runs.clear();
            mi = 0;
            mem_iter.next_runs(seq_list_len, &mut mem_runs)?;
            if mem_runs.is_empty() {
                return Err(VfdError::mismatched(
                    "memory selection terminated before file selection",
                ));
            }
        }

        let file_run = file_runs[fi];
        let mem_run = mem_runs[mi];
        if file_used == file_run.len {
            fi += 1;
            file_used = 0;
            continue;
        }
        if mem_used == mem_run.len {
            mi += 1;
            mem_used = 0;
            continue;
        }

        let io_len = (file_run.len - file_used).min(mem_run.len - mem_used);
        let addr = file_run
            .offset
            .checked_add(file_used as u64)
            .and_then(|o| o.checked_add(offset))
            .ok_or_else(|| VfdError::overflow(file_run.offset, io_len as u64, offset))?;
        sink.segment(Segment {
            addr,
            len: io_len,
            buf,
            mem_offset: mem_run.offset + mem_used as u64,
        })?;

        file_used += io_len;
        mem_used += io_len;
        if file_used == file_run.len {
            fi += 1;
            file_used = 0;
        }
        if mem_used == mem_run.len {
            mi += 1;
            mem_used = 0;
        }
    }

    let mem_left = mem_runs[mi..].iter().any(|run| run.len > 0) || {
        mem_runs.clear();
        mem_iter.next_runs(1, &mut mem_runs)?;
        !mem_runs.is_empty()
    };
    if mem_left {
        return Err(VfdError::mismatched(
            "file selection terminated before memory selection",
        ));
    }
    Ok(())
}

/// Segment accumulator for a batched vector call
#[derive(Debug, Default)]
pub(crate) struct BatchSink {
    pub segments: ScratchVec<[Segment; LOCAL_VECTOR_LEN]>,
}

impl SegmentSink for BatchSink {
    fn segment(&mut self, segment: Segment) -> Result<()> {
        self.segments.push(segment)
    }
}

struct ScalarReadSink<'a, 'b, D> {
    driver: &'a mut D,
    mem_type: MemType,
    bufs: &'a mut [Option<&'b mut [u8]>],
}

impl<D: FileDriver> SegmentSink for ScalarReadSink<'_, '_, D> {
    fn segment(&mut self, segment: Segment) -> Result<()> {
        let buf = self
            .bufs
            .get_mut(segment.buf)
            .and_then(|b| b.as_deref_mut())
            .ok_or_else(|| missing_buffer(segment.buf))?;
        let range = mem_range(buf.len(), &segment)?;
        self.driver
            .read(self.mem_type, segment.addr, &mut buf[range])
            .map_err(|e| VfdError::driver("read", e))
    }
}

struct ScalarWriteSink<'a, 'b, D> {
    driver: &'a mut D,
    mem_type: MemType,
    bufs: &'a [Option<&'b [u8]>],
}

impl<D: FileDriver> SegmentSink for ScalarWriteSink<'_, '_, D> {
    fn segment(&mut self, segment: Segment) -> Result<()> {
        let buf = self
            .bufs
            .get(segment.buf)
            .copied()
            .flatten()
            .ok_or_else(|| missing_buffer(segment.buf))?;
        let range = mem_range(buf.len(), &segment)?;
        self.driver
            .write(self.mem_type, segment.addr, &buf[range])
            .map_err(|e| VfdError::driver("write", e))
    }
}

/// Translate a selection read into vector or scalar driver reads
pub(crate) fn read_translated<D: FileDriver>(
    driver: &mut D,
    seq_list_len: usize,
    mem_type: MemType,
    batch: &SelectionBatch<'_>,
    bufs: &mut [Option<&mut [u8]>],
    skip_vector: bool,
) -> Result<()> {
    if driver.capabilities().vector_read && !skip_vector {
        let mut sink = BatchSink::default();
        merge_selections(batch, seq_list_len, &mut sink)?;
        let fields = VectorFields::new(mem_type, &sink.segments)?;

        tracing::trace!(segments = fields.addrs.len(), "selection read as vector");
        if segments_overlap(&sink.segments) {
            read_staged(driver, &fields, bufs, &sink.segments)?;
        } else {
            let mut views = carve_read_views(bufs, &sink.segments)?;
            driver
                .read_vector(&fields.types, &fields.addrs, &fields.sizes, &mut views)
                .map_err(|e| VfdError::driver("read_vector", e))?;
        }
        record_vector(mem_type, batch.count());
    } else {
        let mut sink = ScalarReadSink {
            driver,
            mem_type,
            bufs,
        };
        merge_selections(batch, seq_list_len, &mut sink)?;
        if batch.count() > 0 {
            record_scalar_fallback(mem_type.is_raw());
        }
    }
    Ok(())
}

/// Batched read for segments whose memory ranges overlap
///
/// Each segment lands in its own staging buffer first and is copied into
/// place in segment order, so later segments win where ranges overlap.
fn read_staged<D: FileDriver>(
    driver: &mut D,
    fields: &VectorFields,
    bufs: &mut [Option<&mut [u8]>],
    segments: &[Segment],
) -> Result<()> {
    for segment in segments {
        let buf = bufs
            .get(segment.buf)
            .and_then(|b| b.as_deref())
            .ok_or_else(|| missing_buffer(segment.buf))?;
        mem_range(buf.len(), segment)?;
    }

    let mut staging: Vec<Vec<u8>> = segments.iter().map(|s| vec![0u8; s.len]).collect();
    {
        let mut views: Vec<&mut [u8]> = staging.iter_mut().map(|b| b.as_mut_slice()).collect();
        driver
            .read_vector(&fields.types, &fields.addrs, &fields.sizes, &mut views)
            .map_err(|e| VfdError::driver("read_vector", e))?;
    }

    for (segment, data) in segments.iter().zip(&staging) {
        let buf = bufs
            .get_mut(segment.buf)
            .and_then(|b| b.as_deref_mut())
            .ok_or_else(|| missing_buffer(segment.buf))?;
        let range = mem_range(buf.len(), segment)?;
        buf[range].copy_from_slice(data);
    }
    Ok(())
}

/// Whether any two segments share bytes of the same caller buffer
fn segments_overlap(segments: &[Segment]) -> bool {
    let mut order: Vec<&Segment> = segments.iter().collect();
    order.sort_unstable_by_key(|s| (s.buf, s.mem_offset));
    order.windows(2).any(|pair| {
        pair[0].buf == pair[1].buf
            && pair[0].mem_offset.saturating_add(pair[0].len as u64) > pair[1].mem_offset
    })
}

/// Translate a selection write into vector or scalar driver writes
pub(crate) fn write_translated<D: FileDriver>(
    driver: &mut D,
    seq_list_len: usize,
    mem_type: MemType,
    batch: &SelectionBatch<'_>,
    bufs: &[Option<&[u8]>],
    skip_vector: bool,
) -> Result<()> {
    if driver.capabilities().vector_write && !skip_vector {
        let mut sink = BatchSink::default();
        merge_selections(batch, seq_list_len, &mut sink)?;
        let fields = VectorFields::new(mem_type, &sink.segments)?;
        let mut views: ScratchVec<[&[u8]; LOCAL_VECTOR_LEN]> = ScratchVec::new();
        for segment in sink.segments.iter() {
            let buf = bufs
                .get(segment.buf)
                .copied()
                .flatten()
                .ok_or_else(|| missing_buffer(segment.buf))?;
            views.push(&buf[mem_range(buf.len(), segment)?])?;
        }

        tracing::trace!(segments = fields.addrs.len(), "selection write as vector");
        driver
            .write_vector(&fields.types, &fields.addrs, &fields.sizes, &views)
            .map_err(|e| VfdError::driver("write_vector", e))?;
        record_vector(mem_type, batch.count());
    } else {
        let mut sink = ScalarWriteSink {
            driver,
            mem_type,
            bufs,
        };
        merge_selections(batch, seq_list_len, &mut sink)?;
        if batch.count() > 0 {
            record_scalar_fallback(mem_type.is_raw());
        }
    }
    Ok(())
}

fn record_vector(mem_type: MemType, count: usize) {
    if mem_type.is_raw() && count > 0 {
        telemetry::record_mode(IoModes::VECTOR);
    }
}

/// Compressed vector arrays for a segment batch: one memory type for the
/// whole batch, an explicit size per segment
struct VectorFields {
    types: ScratchVec<[MemType; LOCAL_VECTOR_LEN]>,
    addrs: ScratchVec<[Addr; LOCAL_VECTOR_LEN]>,
    sizes: ScratchVec<[usize; LOCAL_VECTOR_LEN]>,
}

impl VectorFields {
    fn new(mem_type: MemType, segments: &[Segment]) -> Result<Self> {
        let mut fields = Self {
            types: ScratchVec::new(),
            addrs: ScratchVec::new(),
            sizes: ScratchVec::new(),
        };
        for (i, segment) in segments.iter().enumerate() {
            fields
                .types
                .push(if i == 0 { mem_type } else { MemType::NoList })?;
            fields.addrs.push(segment.addr)?;
            fields.sizes.push(segment.len)?;
        }
        Ok(fields)
    }
}

/// Split the caller's read buffers into one disjoint view per segment,
/// returned in segment order
fn carve_read_views<'a>(
    bufs: &'a mut [Option<&mut [u8]>],
    segments: &[Segment],
) -> Result<Vec<&'a mut [u8]>> {
    let mut order: Vec<usize> = (0..segments.len()).collect();
    order.sort_unstable_by_key(|&j| (segments[j].buf, segments[j].mem_offset));

    let mut slots: Vec<Option<&'a mut [u8]>> = bufs.iter_mut().map(|b| b.as_deref_mut()).collect();
    let mut views: Vec<Option<&'a mut [u8]>> = Vec::new();
    views.resize_with(segments.len(), || None);

    let mut k = 0;
    while let Some(&first) = order.get(k) {
        let buf = segments[first].buf;
        let mut rest: &'a mut [u8] = slots
            .get_mut(buf)
            .and_then(Option::take)
            .ok_or_else(|| missing_buffer(buf))?;
        let mut cursor = 0u64;

        while let Some(&j) = order.get(k) {
            let segment = segments[j];
            if segment.buf != buf {
                break;
            }
            if segment.mem_offset < cursor {
                return Err(VfdError::invalid(format!(
                    "memory runs overlap at offset {} of buffer {}",
                    segment.mem_offset, buf
                )));
            }
            let skip = usize::try_from(segment.mem_offset - cursor)
                .ok()
                .filter(|skip| {
                    skip.checked_add(segment.len)
                        .map_or(false, |end| end <= rest.len())
                })
                .ok_or_else(|| out_of_buffer(&segment))?;

            let tail = std::mem::take(&mut rest);
            let (_, tail) = tail.split_at_mut(skip);
            let (view, tail) = tail.split_at_mut(segment.len);
            rest = tail;
            cursor = segment.mem_offset + segment.len as u64;
            views[j] = Some(view);
            k += 1;
        }
    }

    views
        .into_iter()
        .enumerate()
        .map(|(j, view)| view.ok_or_else(|| missing_buffer(segments[j].buf)))
        .collect()
}

fn mem_range(buf_len: usize, segment: &Segment) -> Result<Range<usize>> {
    let start = usize::try_from(segment.mem_offset).ok();
    match start.and_then(|s| s.checked_add(segment.len).map(|e| s..e)) {
        Some(range) if range.end <= buf_len => Ok(range),
        _ => Err(out_of_buffer(segment)),
    }
}

fn missing_buffer(index: usize) -> VfdError {
    VfdError::invalid(format!("no buffer for request {}", index))
}

fn out_of_buffer(segment: &Segment) -> VfdError {
    VfdError::invalid(format!(
        "memory run of {} bytes at offset {} exceeds buffer {}",
        segment.len, segment.mem_offset, segment.buf
    ))
}
