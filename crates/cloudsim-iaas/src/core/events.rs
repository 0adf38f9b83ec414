//! Standard simulation events.

// VM EVENTS ///////////////////////////////////////////////////////////////////////////////////////

pub mod vm {
    use serde::Serialize;

    use crate::core::vm::VmSpec;

    #[derive(Serialize, Clone)]
    pub struct VmCreateRequest {
        pub vm: VmSpec,
    }

    #[derive(Serialize, Clone)]
    pub struct VmCreated {
        pub vm_id: u32,
        pub host_id: u32,
    }

    #[derive(Serialize, Clone)]
    pub struct VmCreateFailed {
        pub vm_id: u32,
        pub reason: String,
    }

    #[derive(Serialize, Clone)]
    pub struct VmDestroyRequest {
        pub vm_id: u32,
    }

    #[derive(Serialize, Clone)]
    pub struct VmDestroyed {
        pub vm_id: u32,
    }

    /// VM was evicted because its host failed.
    #[derive(Serialize, Clone)]
    pub struct VmFailed {
        pub vm_id: u32,
        pub host_id: u32,
    }
}

// CLOUDLET EVENTS /////////////////////////////////////////////////////////////////////////////////

pub mod cloudlet {
    use serde::Serialize;

    use crate::core::cloudlet::Cloudlet;

    #[derive(Serialize, Clone)]
    pub struct CloudletSubmit {
        pub cloudlet: Cloudlet,
    }

    /// Cloudlet in a terminal status sent back to its broker.
    #[derive(Serialize, Clone)]
    pub struct CloudletReturn {
        pub cloudlet: Cloudlet,
    }

    #[derive(Serialize, Clone)]
    pub struct CloudletCancelRequest {
        pub cloudlet_id: u32,
        pub vm_id: u32,
    }

    #[derive(Serialize, Clone)]
    pub struct CloudletPauseRequest {
        pub cloudlet_id: u32,
        pub vm_id: u32,
    }

    #[derive(Serialize, Clone)]
    pub struct CloudletResumeRequest {
        pub cloudlet_id: u32,
        pub vm_id: u32,
    }
}

// DATACENTER EVENTS ///////////////////////////////////////////////////////////////////////////////

pub mod datacenter {
    use serde::Serialize;

    /// Scheduled at the earliest estimated cloudlet completion.
    #[derive(Serialize, Clone)]
    pub struct UpdateProcessing {}

    /// Periodic processing update while cloudlets are running.
    #[derive(Serialize, Clone)]
    pub struct SchedulingTick {}

    #[derive(Serialize, Clone)]
    pub struct HostFailure {
        pub host_id: u32,
    }
}

// BROKER EVENTS ///////////////////////////////////////////////////////////////////////////////////

pub mod broker {
    use serde::Serialize;

    #[derive(Serialize, Clone)]
    pub struct BrokerStart {}

    #[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
    pub enum CloudletAction {
        Cancel,
        Pause,
        Resume,
    }

    #[derive(Serialize, Clone)]
    pub struct CloudletActionRequest {
        pub cloudlet_id: u32,
        pub action: CloudletAction,
    }
}
