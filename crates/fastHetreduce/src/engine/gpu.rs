//! GPU execution context for device reductions.
//!
//! ## Purpose
//!
//! This module provides [`GpuDevice`], which runs the three reduction
//! strategies as WGSL compute kernels through `wgpu`. The dispatch policy of
//! the core crate picks the strategy from the adapter's limits; this module
//! turns the choice into dispatches.
//!
//! ## Design notes
//!
//! * **Closed operator set**: Kernels are generated from [`BuiltinOp`] and
//!   [`BuiltinTransform`] over a [`Scalar`]; closures are not supported.
//! * **Pipeline cache**: One module per (scalar, operator, transform, group
//!   size), compiled once per entry point and kernel name.
//! * **One submission**: Every pass of a reduction is recorded into one
//!   command encoder in order, so later passes observe earlier writes.
//! * **Asynchronous readback**: The result is copied to a staging buffer and
//!   mapped on a rayon worker that fulfils the handle.
//!
//! ## Key concepts
//!
//! * **`reduce_seq`**: One invocation folds the whole input.
//! * **`reduce_groups`**: Each item folds its strided elements, the group
//!   synchronizes, and the staging area is folded pairwise. The leader
//!   writes the group's partial to the intermediate buffer and, when it is
//!   the only group, the init-folded result to the result cell.
//! * **Parameter block**: Element count, items per work item, group count,
//!   half offsets, first-pass flag and init bits travel per pass as a uniform.
//!
//! ## Invariants
//!
//! * Group-local memory is `2 * size_of::<S>()` bytes per item (value plus
//!   occupancy flag), matching the default local-memory factor.
//! * Passes never read and write the same half of the intermediate buffer.
//!
//! ## Non-goals
//!
//! * This module does not run arbitrary closures (use `RayonDevice`).
//! * This module does not keep input data resident between calls.

// External dependencies
use bytemuck::{Pod, Zeroable};
use log::{debug, trace};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::{
    BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingType, Buffer, BufferBindingType, BufferDescriptor, BufferUsages,
    CommandEncoderDescriptor, ComputePassDescriptor, ComputePipeline, ComputePipelineDescriptor,
    Device, DeviceDescriptor, Instance, InstanceDescriptor, Limits, MapMode, PipelineLayout,
    PipelineLayoutDescriptor, PollType, Queue, RequestAdapterOptions, ShaderModuleDescriptor,
    ShaderSource, ShaderStages,
};

// Export dependencies from hetreduce crate
use hetreduce::internals::device::{Capabilities, check_work_group_size, fit_local_allocation};
use hetreduce::internals::engine::future::{ReduceFuture, channel};
use hetreduce::internals::engine::policy::{ReduceConfig, Strategy};
use hetreduce::internals::engine::tree::PassState;
use hetreduce::internals::engine::validator::Validator;
use hetreduce::internals::ops::init::Init;
use hetreduce::internals::primitives::errors::ReduceError;
use hetreduce::internals::primitives::range::DeviceBuffer;

// Internal dependencies
use crate::engine::builtin::{BuiltinOp, BuiltinTransform, Scalar};

/// Size in bytes of every scalar and of the result cell.
const SCALAR_BYTES: u64 = 4;

/// Entry point folding the whole input in one invocation.
pub const SEQUENTIAL_ENTRY: &str = "reduce_seq";

/// Entry point of the single-group and tree strategies.
pub const GROUP_ENTRY: &str = "reduce_groups";

// ============================================================================
// Shader Source (WGSL)
// ============================================================================

const SHADER_TEMPLATE: &str = r#"
struct Params {
    n: u32,
    iters: u32,
    n_groups: u32,
    src_offset: u32,
    dst_offset: u32,
    first: u32,
    has_init: u32,
    init_bits: u32,
}

@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var<storage, read> input: array<{S}>;
@group(0) @binding(2) var<storage, read_write> temp: array<{S}>;
@group(0) @binding(3) var<storage, read_write> result: array<{S}>;

const WG: u32 = {WG}u;

var<workgroup> local_vals: array<{S}, WG>;
var<workgroup> local_has: array<u32, WG>;

fn combine(a: {S}, b: {S}) -> {S} {
    {COMBINE}
}

fn transform(v: {S}) -> {S} {
    {TRANSFORM}
}

fn finish(partial: {S}) -> {S} {
    if (params.has_init == 1u) {
        return combine(bitcast<{S}>(params.init_bits), partial);
    }
    return partial;
}

@compute @workgroup_size(1)
fn reduce_seq() {
    var acc = transform(input[0]);
    for (var i = 1u; i < params.n; i = i + 1u) {
        acc = combine(acc, transform(input[i]));
    }
    result[0] = finish(acc);
}

@compute @workgroup_size(WG)
fn reduce_groups(
    @builtin(local_invocation_id) lid3: vec3<u32>,
    @builtin(workgroup_id) wid3: vec3<u32>,
) {
    let lid = lid3.x;
    let group = wid3.x;
    let base = group * WG * params.iters;

    // 1. Strided transform into a private accumulator.
    var acc: {S};
    var has = 0u;
    for (var k = 0u; k < params.iters; k = k + 1u) {
        let idx = base + lid + k * WG;
        if (idx < params.n) {
            var v: {S};
            if (params.first == 1u) {
                v = transform(input[idx]);
            } else {
                v = temp[params.src_offset + idx];
            }
            if (has == 1u) {
                acc = combine(acc, v);
            } else {
                acc = v;
                has = 1u;
            }
        }
    }
    local_vals[lid] = acc;
    local_has[lid] = has;
    workgroupBarrier();

    // 2. Pairwise fold of the staging area.
    for (var s = 1u; s < WG; s = s * 2u) {
        if (lid % (2u * s) == 0u && lid + s < WG && local_has[lid + s] == 1u) {
            if (local_has[lid] == 1u) {
                local_vals[lid] = combine(local_vals[lid], local_vals[lid + s]);
            } else {
                local_vals[lid] = local_vals[lid + s];
                local_has[lid] = 1u;
            }
        }
        workgroupBarrier();
    }

    // 3. Leader publishes the partial.
    if (lid == 0u) {
        let partial = local_vals[0];
        temp[params.dst_offset + group] = partial;
        if (params.n_groups == 1u) {
            result[0] = finish(partial);
        }
    }
}
"#;

/// WGSL source for one (scalar, operator, transform, group size) combination.
pub fn shader_source(
    scalar: &str,
    op: BuiltinOp,
    transform: BuiltinTransform,
    work_group_size: usize,
) -> String {
    SHADER_TEMPLATE
        .replace("{S}", scalar)
        .replace("{WG}", &work_group_size.to_string())
        .replace("{COMBINE}", op.wgsl())
        .replace("{TRANSFORM}", transform.wgsl())
}

// ============================================================================
// Pass Planning
// ============================================================================

/// Per-pass parameter block (mirrors the WGSL `Params` struct).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct PassParams {
    /// Elements read by this pass.
    pub n: u32,
    /// Elements folded by each item.
    pub iters: u32,
    /// Groups dispatched by this pass.
    pub n_groups: u32,
    /// Offset of the half read by a later pass.
    pub src_offset: u32,
    /// Offset of the half written by this pass.
    pub dst_offset: u32,
    /// 1 on the pass reading the input range.
    pub first: u32,
    /// 1 when an init value is present.
    pub has_init: u32,
    /// Raw bits of the init value.
    pub init_bits: u32,
}

/// Dispatches realizing one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    /// Entry point to run.
    pub entry: &'static str,
    /// Items per group.
    pub work_group_size: usize,
    /// Parameter block of every pass, in submission order.
    pub passes: Vec<PassParams>,
    /// Length of the intermediate buffer (both halves).
    pub temp_len: usize,
}

fn to_u32(value: usize, what: &str) -> Result<u32, ReduceError> {
    u32::try_from(value).map_err(|_| ReduceError::Unsupported {
        device: "gpu",
        feature: format!("{what} of {value} (exceeds u32)"),
    })
}

/// Lay out the passes of `strategy` over `n` elements.
pub fn plan_dispatch<T: Scalar>(
    strategy: Strategy,
    n: usize,
    init: &Init<T>,
) -> Result<DispatchPlan, ReduceError> {
    let (has_init, init_bits) = match init {
        Init::None => (0, T::zero().to_bits()),
        Init::Value(v) => (1, v.to_bits()),
    };
    let first_pass = |n: usize, iters: usize| -> Result<PassParams, ReduceError> {
        Ok(PassParams {
            n: to_u32(n, "element count")?,
            iters: to_u32(iters, "items per work item")?,
            n_groups: 1,
            src_offset: 1,
            dst_offset: 0,
            first: 1,
            has_init,
            init_bits,
        })
    };

    match strategy {
        Strategy::Sequential => Ok(DispatchPlan {
            entry: SEQUENTIAL_ENTRY,
            work_group_size: 1,
            passes: vec![first_pass(n, n)?],
            temp_len: 2,
        }),
        Strategy::SingleGroup(tile) => {
            let tile = tile.covering(n);
            Ok(DispatchPlan {
                entry: GROUP_ENTRY,
                work_group_size: tile.work_group_size,
                passes: vec![first_pass(n, tile.iters_per_work_item)?],
                temp_len: 2,
            })
        }
        Strategy::Tree(tile) => {
            let mut n = n;
            let mut n_groups = tile.groups_for(n);
            let half = n_groups;
            let mut dst = 0;
            let mut state = PassState::FirstPass;
            let mut passes = Vec::new();

            while state != PassState::Done {
                passes.push(PassParams {
                    n: to_u32(n, "element count")?,
                    iters: to_u32(tile.iters_per_work_item, "items per work item")?,
                    n_groups: to_u32(n_groups, "group count")?,
                    src_offset: to_u32((1 - dst) * half, "buffer offset")?,
                    dst_offset: to_u32(dst * half, "buffer offset")?,
                    first: u32::from(state == PassState::FirstPass),
                    has_init,
                    init_bits,
                });

                state = if n_groups == 1 {
                    PassState::Done
                } else {
                    PassState::SubsequentPass
                };
                dst = 1 - dst;
                n = n_groups;
                n_groups = tile.groups_for(n);
            }

            Ok(DispatchPlan {
                entry: GROUP_ENTRY,
                work_group_size: tile.work_group_size,
                passes,
                temp_len: (2 * half).max(2),
            })
        }
    }
}

/// Reject plans whose dispatches or buffers exceed the adapter limits.
pub fn check_limits(plan: &DispatchPlan, n: usize, limits: &Limits) -> Result<(), ReduceError> {
    let max_groups = limits.max_compute_workgroups_per_dimension;
    if let Some(pass) = plan.passes.iter().find(|p| p.n_groups > max_groups) {
        return Err(ReduceError::Unsupported {
            device: "gpu",
            feature: format!("{} groups in one dispatch (max {max_groups})", pass.n_groups),
        });
    }

    let max_binding = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
    for (what, len) in [("input", n), ("intermediate buffer", plan.temp_len)] {
        let bytes = (len as u64).saturating_mul(SCALAR_BYTES);
        if bytes > max_binding {
            return Err(ReduceError::Unsupported {
                device: "gpu",
                feature: format!("{what} of {bytes} bytes (max binding {max_binding})"),
            });
        }
    }
    Ok(())
}

// ============================================================================
// GPU Device
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    scalar: &'static str,
    op: BuiltinOp,
    transform: BuiltinTransform,
    work_group_size: usize,
    entry: &'static str,
    kernel_name: Option<&'static str>,
}

struct GpuContext {
    device: Device,
    queue: Queue,
    adapter_name: String,
    limits: Limits,
    layout: BindGroupLayout,
    pipeline_layout: PipelineLayout,
    pipelines: Mutex<HashMap<PipelineKey, ComputePipeline>>,
}

/// Device running reductions as WGSL compute kernels.
#[derive(Clone)]
pub struct GpuDevice {
    inner: Arc<GpuContext>,
}

impl Debug for GpuDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuDevice")
            .field("adapter", &self.inner.adapter_name)
            .field("max_work_group_size", &self.max_work_group_size())
            .finish_non_exhaustive()
    }
}

impl GpuDevice {
    /// Open the default adapter, requesting its full limits.
    pub fn new() -> Result<Self, ReduceError> {
        pollster::block_on(Self::request())
    }

    async fn request() -> Result<Self, ReduceError> {
        let instance = Instance::new(&InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&RequestAdapterOptions::default())
            .await
            .map_err(|e| ReduceError::Unsupported {
                device: "gpu",
                feature: format!("no adapter: {e:?}"),
            })?;

        let adapter_name = adapter.get_info().name;
        let (device, queue): (Device, Queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("hetreduce"),
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await
            .map_err(|e| ReduceError::DeviceFault(format!("device request: {e:?}")))?;

        let storage = |binding: u32, read_only: bool| BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::COMPUTE,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("hetreduce layout"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::COMPUTE,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage(1, true),
                storage(2, false),
                storage(3, false),
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("hetreduce pipeline layout"),
            bind_group_layouts: &[&layout],
            ..Default::default()
        });

        let limits = device.limits();
        debug!(
            "gpu: opened '{adapter_name}' ({} invocations, {} bytes workgroup storage)",
            limits.max_compute_invocations_per_workgroup, limits.max_compute_workgroup_storage_size
        );

        Ok(Self {
            inner: Arc::new(GpuContext {
                device,
                queue,
                adapter_name,
                limits,
                layout,
                pipeline_layout,
                pipelines: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Name of the adapter in use.
    pub fn adapter_name(&self) -> &str {
        &self.inner.adapter_name
    }

    /// Number of compiled pipelines in the cache.
    pub fn cached_pipelines(&self) -> usize {
        self.inner.pipelines.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn pipeline<T: Scalar>(
        &self,
        op: BuiltinOp,
        transform: BuiltinTransform,
        plan: &DispatchPlan,
        kernel_name: Option<&'static str>,
    ) -> Result<ComputePipeline, ReduceError> {
        let key = PipelineKey {
            scalar: T::WGSL,
            op,
            transform,
            work_group_size: plan.work_group_size,
            entry: plan.entry,
            kernel_name,
        };
        let mut cache = self
            .inner
            .pipelines
            .lock()
            .map_err(|_| ReduceError::DeviceFault("pipeline cache poisoned".to_string()))?;

        if let Some(pipeline) = cache.get(&key) {
            return Ok(pipeline.clone());
        }

        let label = format!(
            "{}:{}_{}_{}_wg{}",
            kernel_name.unwrap_or("reduce"),
            T::WGSL,
            op.name(),
            transform.name(),
            plan.work_group_size
        );
        trace!("gpu: compiling {label} ({})", plan.entry);

        let ctx = &self.inner;
        let module = ctx.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(&label),
            source: ShaderSource::Wgsl(
                shader_source(T::WGSL, op, transform, plan.work_group_size).into(),
            ),
        });
        let pipeline = ctx
            .device
            .create_compute_pipeline(&ComputePipelineDescriptor {
                label: Some(&label),
                layout: Some(&ctx.pipeline_layout),
                module: &module,
                entry_point: Some(plan.entry),
                compilation_options: Default::default(),
                cache: None,
            });

        cache.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    /// Transform every element with `transform`, combine with `op`, fold in `init`.
    pub fn transform_reduce<T: Scalar>(
        &self,
        config: &ReduceConfig,
        input: &DeviceBuffer<T>,
        init: Init<T>,
        op: BuiltinOp,
        transform: BuiltinTransform,
    ) -> Result<ReduceFuture<T>, ReduceError> {
        let n = Validator::validate_ranges(input)?;
        let strategy = config.select_strategy::<T, Self>(n, self);
        let plan = plan_dispatch(strategy, n, &init)?;

        check_work_group_size(self, plan.work_group_size)?;
        check_limits(&plan, n, &self.inner.limits)?;

        let pipeline = self.pipeline::<T>(op, transform, &plan, config.kernel_name)?;
        let ctx = &self.inner;

        let input_buffer = ctx.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("hetreduce input"),
            contents: bytemuck::cast_slice(input.as_slice()),
            usage: BufferUsages::STORAGE,
        });
        let temp_buffer = ctx.device.create_buffer(&BufferDescriptor {
            label: Some("hetreduce intermediate"),
            size: plan.temp_len as u64 * SCALAR_BYTES,
            usage: BufferUsages::STORAGE,
            mapped_at_creation: false,
        });
        let result_buffer = ctx.device.create_buffer(&BufferDescriptor {
            label: Some("hetreduce result"),
            size: SCALAR_BYTES,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging = ctx.device.create_buffer(&BufferDescriptor {
            label: Some("hetreduce staging"),
            size: SCALAR_BYTES,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some(config.kernel_name.unwrap_or("hetreduce")),
            });

        for (i, params) in plan.passes.iter().enumerate() {
            trace!(
                "gpu pass {i}: n={}, groups={}, dst offset {}",
                params.n, params.n_groups, params.dst_offset
            );
            let params_buffer = ctx.device.create_buffer_init(&BufferInitDescriptor {
                label: Some("hetreduce params"),
                contents: bytemuck::bytes_of(params),
                usage: BufferUsages::UNIFORM,
            });
            let bind_group = ctx.device.create_bind_group(&BindGroupDescriptor {
                label: Some("hetreduce bind group"),
                layout: &ctx.layout,
                entries: &[
                    BindGroupEntry {
                        binding: 0,
                        resource: params_buffer.as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 1,
                        resource: input_buffer.as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 2,
                        resource: temp_buffer.as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 3,
                        resource: result_buffer.as_entire_binding(),
                    },
                ],
            });

            let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor::default());
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(params.n_groups, 1, 1);
        }

        encoder.copy_buffer_to_buffer(&result_buffer, 0, &staging, 0, SCALAR_BYTES);
        ctx.queue.submit(Some(encoder.finish()));

        let (promise, future) = channel();
        let device = ctx.device.clone();
        rayon::spawn(move || promise.fulfill(read_back::<T>(&device, &staging)));

        Ok(future)
    }

    /// Combine every element with `op`, fold in `init`.
    pub fn reduce<T: Scalar>(
        &self,
        config: &ReduceConfig,
        input: &DeviceBuffer<T>,
        init: Init<T>,
        op: BuiltinOp,
    ) -> Result<ReduceFuture<T>, ReduceError> {
        self.transform_reduce(config, input, init, op, BuiltinTransform::Identity)
    }
}

impl Capabilities for GpuDevice {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn max_work_group_size(&self) -> usize {
        let limits = &self.inner.limits;
        limits
            .max_compute_invocations_per_workgroup
            .min(limits.max_compute_workgroup_size_x) as usize
    }

    fn max_local_allocation_size(&self, bytes_per_item: usize, work_group_size: usize) -> usize {
        fit_local_allocation(
            self.inner.limits.max_compute_workgroup_storage_size as usize,
            bytes_per_item,
            work_group_size,
        )
    }
}

fn read_back<T: Scalar>(device: &Device, staging: &Buffer) -> Result<T, ReduceError> {
    let slice = staging.slice(..);
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    slice.map_async(MapMode::Read, move |v| {
        let _ = tx.send(v);
    });
    device
        .poll(PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .map_err(|e| ReduceError::DeviceFault(format!("poll: {e:?}")))?;

    match pollster::block_on(rx.receive()) {
        Some(Ok(())) => {
            let data = slice.get_mapped_range();
            let bits: u32 = bytemuck::pod_read_unaligned(&data[..SCALAR_BYTES as usize]);
            drop(data);
            staging.unmap();
            Ok(T::from_bits(bits))
        }
        Some(Err(e)) => Err(ReduceError::DeviceFault(format!("readback: {e:?}"))),
        None => Err(ReduceError::Disconnected),
    }
}
