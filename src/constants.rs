pub mod network {
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
    pub const DEFAULT_HTTP_PORT: u16 = 8000;
    pub const USER_AGENT: &str = concat!("ocm-mcp/", env!("CARGO_PKG_VERSION"));
}

pub mod defaults {
    pub const API_BASE: &str = "https://api.openshift.com";
    pub const CLIENT_ID: &str = "cloud-services";
    pub const ACCESS_TOKEN_URL: &str =
        "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token";
    pub const TRANSPORT: &str = "stdio";
}

pub mod settings {
    pub const API_BASE: &str = "OCM_API_BASE";
    pub const CLIENT_ID: &str = "OCM_CLIENT_ID";
    pub const OFFLINE_TOKEN: &str = "OCM_OFFLINE_TOKEN";
    pub const ACCESS_TOKEN_URL: &str = "ACCESS_TOKEN_URL";
    pub const TRANSPORT: &str = "MCP_TRANSPORT";
}

pub mod headers {
    pub const OFFLINE_TOKEN: &str = "X-OCM-Offline-Token";
    pub const CLIENT_ID: &str = "X-OCM-Client-Id";
    pub const SESSION_ID: &str = "Mcp-Session-Id";
}

pub mod paths {
    pub const CURRENT_ACCOUNT: &str = "/api/accounts_mgmt/v1/current_account";
    pub const CLUSTERS: &str = "/api/clusters_mgmt/v1/clusters";
    pub const CLUSTER_LOGS: &str = "/api/service_logs/v1/clusters/cluster_logs";
}

pub mod cluster_defaults {
    pub const REGION: &str = "us-east-1";
    pub const NODES: u64 = 4;
    pub const INSTANCE_TYPE: &str = "m5.xlarge";
    pub const CLOUD_PROVIDER: &str = "aws";
    pub const STORAGE_QUOTA_BYTES: u64 = 107_374_182_400;
}

pub mod limits {
    pub const ERROR_BODY_EXCERPT: usize = 512;
}
