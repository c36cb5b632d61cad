//! Engagement metrics for interview video streams.
//!
//! Frames arrive as base64 data URLs, are run through a face-mesh model, and
//! come out as per-frame face count, eye contact, speaking and blink rate.

pub mod decoding {
    pub mod domain {
        pub mod frame_decoder;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod face_box;
        pub mod face_detector;
        pub mod face_landmarks;
        pub mod face_mesh_model;
        pub mod landmark_provider;
    }
    pub mod infrastructure;
}

pub mod metrics {
    pub mod domain {
        pub mod engagement_metrics;
        pub mod engine_state;
        pub mod heuristics;
        pub mod metrics_config;
        pub mod metrics_engine;
    }
}

pub mod pipeline {
    pub mod pipeline_logger;
    pub mod stream_metrics_use_case;
}

pub mod protocol {
    pub mod messages;
}

pub mod session {
    pub mod session_registry;
}

pub mod shared {
    pub mod clock;
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
}
