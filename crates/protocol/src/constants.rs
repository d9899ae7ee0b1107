//! Endpoint locations and fixed protocol values.

/// Host serving the `xpan` open API (precreate, create, metas, user info).
pub const OPEN_API_DOMAIN: &str = "https://pan.baidu.com";

/// Host accepting chunk uploads.
pub const PCS_DATA_DOMAIN: &str = "https://d.pcs.baidu.com";

/// Host serving path-addressed downloads.
pub const PCS_API_DOMAIN: &str = "https://pcs.baidu.com";

pub const PRECREATE_URI: &str = "/rest/2.0/xpan/file?method=precreate";
pub const CREATE_URI: &str = "/rest/2.0/xpan/file?method=create";
pub const CHUNK_UPLOAD_URI: &str = "/rest/2.0/pcs/superfile2?method=upload";
pub const USER_INFO_URI: &str = "/rest/2.0/xpan/nas?method=uinfo";
pub const FILE_METAS_URI: &str = "/rest/2.0/xpan/multimedia?method=filemetas";
pub const PCS_DOWNLOAD_URI: &str = "/rest/2.0/pcs/file?method=download";

/// Precreate `return_type` signalling the service already holds identical content.
pub const RETURN_TYPE_EXISTS: i32 = 2;

/// `rtype` value asking the service to rename on any path conflict.
pub const RENAME_ON_CONFLICT: &str = "1";

/// Multipart form field carrying chunk bytes.
pub const CHUNK_FORM_FIELD: &str = "file";

/// Query `type` value for chunk uploads.
pub const CHUNK_UPLOAD_TYPE: &str = "tmpfile";

/// Browser User-Agent strings; one is picked at random per request.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.1 (KHTML, like Gecko) Chrome/22.0.1207.1 Safari/537.1",
    "Mozilla/5.0 (X11; CrOS i686 2268.111.0) AppleWebKit/536.11 (KHTML, like Gecko) Chrome/20.0.1132.57 Safari/536.11",
    "Mozilla/5.0 (Windows NT 6.2) AppleWebKit/536.6 (KHTML, like Gecko) Chrome/20.0.1090.0 Safari/536.6",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/536.5 (KHTML, like Gecko) Chrome/19.0.1084.9 Safari/536.5",
    "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/536.3 (KHTML, like Gecko) Chrome/19.0.1063.0 Safari/536.3",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/535.24 (KHTML, like Gecko) Chrome/19.0.1055.1 Safari/535.24",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/76.0.3809.100 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/86.0.4240.183 Safari/537.36",
];
