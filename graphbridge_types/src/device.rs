//! Device context for array placement
//!
//! Identifies the compute device an array resides on: a [`DeviceKind`] plus
//! an index. Kind codes follow the DLPack `DLDeviceType` numbering so a
//! context converts to and from the engine's raw device struct without a
//! lookup table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of compute device, numbered as in DLPack's `DLDeviceType`
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceKind {
    /// Host memory
    Cpu = 1,
    /// CUDA GPU
    Cuda = 2,
    /// Pinned CUDA host memory
    CudaHost = 3,
    /// OpenCL device
    OpenCl = 4,
    /// Vulkan GPU
    Vulkan = 7,
    /// Metal GPU
    Metal = 8,
    /// Verilog simulator buffer
    Vpi = 9,
    /// ROCm GPU
    Rocm = 10,
    /// Pinned ROCm host memory
    RocmHost = 11,
    /// Reserved extension device
    ExtDev = 12,
    /// CUDA managed/unified memory
    CudaManaged = 13,
    /// Unified shared memory through oneAPI
    OneApi = 14,
    /// WebGPU device
    WebGpu = 15,
    /// Qualcomm Hexagon DSP
    Hexagon = 16,
}

impl DeviceKind {
    /// All known kinds, in code order
    pub const ALL: [DeviceKind; 14] = [
        DeviceKind::Cpu,
        DeviceKind::Cuda,
        DeviceKind::CudaHost,
        DeviceKind::OpenCl,
        DeviceKind::Vulkan,
        DeviceKind::Metal,
        DeviceKind::Vpi,
        DeviceKind::Rocm,
        DeviceKind::RocmHost,
        DeviceKind::ExtDev,
        DeviceKind::CudaManaged,
        DeviceKind::OneApi,
        DeviceKind::WebGpu,
        DeviceKind::Hexagon,
    ];

    /// DLPack device type code
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Look up a kind by its DLPack device type code
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(DeviceKind::Cpu),
            2 => Some(DeviceKind::Cuda),
            3 => Some(DeviceKind::CudaHost),
            4 => Some(DeviceKind::OpenCl),
            7 => Some(DeviceKind::Vulkan),
            8 => Some(DeviceKind::Metal),
            9 => Some(DeviceKind::Vpi),
            10 => Some(DeviceKind::Rocm),
            11 => Some(DeviceKind::RocmHost),
            12 => Some(DeviceKind::ExtDev),
            13 => Some(DeviceKind::CudaManaged),
            14 => Some(DeviceKind::OneApi),
            15 => Some(DeviceKind::WebGpu),
            16 => Some(DeviceKind::Hexagon),
            _ => None,
        }
    }

    /// Lowercase name used in the `"<kind>:<index>"` rendering
    pub const fn name(self) -> &'static str {
        match self {
            DeviceKind::Cpu => "cpu",
            DeviceKind::Cuda => "cuda",
            DeviceKind::CudaHost => "cuda_host",
            DeviceKind::OpenCl => "opencl",
            DeviceKind::Vulkan => "vulkan",
            DeviceKind::Metal => "metal",
            DeviceKind::Vpi => "vpi",
            DeviceKind::Rocm => "rocm",
            DeviceKind::RocmHost => "rocm_host",
            DeviceKind::ExtDev => "ext_dev",
            DeviceKind::CudaManaged => "cuda_managed",
            DeviceKind::OneApi => "oneapi",
            DeviceKind::WebGpu => "webgpu",
            DeviceKind::Hexagon => "hexagon",
        }
    }

    /// Parse a kind from its name (case-insensitive, `gpu` aliases `cuda`)
    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        if s == "gpu" {
            return Some(DeviceKind::Cuda);
        }
        Self::ALL.iter().copied().find(|kind| kind.name() == s)
    }

    /// Whether memory of this kind is directly addressable by the host
    #[inline]
    pub const fn is_host(self) -> bool {
        matches!(self, DeviceKind::Cpu)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Device an array resides on
///
/// Equality is structural: two contexts are equal iff both the kind and the
/// index match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceContext {
    /// Device kind
    pub kind: DeviceKind,
    /// Device index (GPU number for accelerators, 0 for the host)
    pub index: i32,
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self::CPU
    }
}

impl DeviceContext {
    /// Host device constant
    pub const CPU: DeviceContext = DeviceContext {
        kind: DeviceKind::Cpu,
        index: 0,
    };

    /// Create a context from kind and index
    #[inline]
    pub const fn new(kind: DeviceKind, index: i32) -> Self {
        Self { kind, index }
    }

    /// Host device
    #[inline]
    pub const fn cpu() -> Self {
        Self::CPU
    }

    /// CUDA device with the given index
    #[inline]
    pub const fn cuda(index: i32) -> Self {
        Self {
            kind: DeviceKind::Cuda,
            index,
        }
    }

    /// Check if the context is the host
    #[inline]
    pub const fn is_cpu(&self) -> bool {
        self.kind.is_host()
    }

    /// Parse a context from text (e.g. "cpu", "cpu:0", "cuda", "cuda:1", "gpu:2")
    ///
    /// A bare kind means index 0.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (kind, index) = match s.split_once(':') {
            Some((kind, idx)) => (kind, idx.parse::<i32>().ok()?),
            None => (s, 0),
        };
        let kind = DeviceKind::from_name(kind)?;
        Some(Self { kind, index })
    }

    /// Convert to the raw DLPack `(device_type, device_id)` pair
    #[inline]
    pub const fn to_dlpack(&self) -> (i32, i32) {
        (self.kind.code(), self.index)
    }

    /// Create from a raw DLPack `(device_type, device_id)` pair
    pub const fn from_dlpack(device_type: i32, device_id: i32) -> Option<Self> {
        match DeviceKind::from_code(device_type) {
            Some(kind) => Some(Self {
                kind,
                index: device_id,
            }),
            None => None,
        }
    }
}

/// Check whether two device contexts are the same
#[inline]
pub fn device_equals(a: &DeviceContext, b: &DeviceContext) -> bool {
    a.kind == b.kind && a.index == b.index
}

/// Render a device context as `"<kind>:<index>"`
///
/// The kind is the lowercase DLPack device name, so an accelerator context
/// renders as e.g. `"cuda:2"` and the host as `"cpu:0"`.
pub fn device_format(ctx: &DeviceContext) -> String {
    ctx.to_string()
}

impl fmt::Display for DeviceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.index)
    }
}

// Serialized as its formatted string ("cpu:0", "cuda:1", ...)
impl Serialize for DeviceContext {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DeviceContext {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DeviceContext::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid device: {}", s)))
    }
}
