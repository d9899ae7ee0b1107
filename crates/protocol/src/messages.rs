use serde::{Deserialize, Serialize};

use crate::constants::{RENAME_ON_CONFLICT, RETURN_TYPE_EXISTS};
use crate::lenient::u32_from_any;
use crate::types::{ApiStatus, FileInfo, PcsStatus, ResponseStatus};

// ---------------------------------------------------------------------------
// Upload handshake
// ---------------------------------------------------------------------------

/// Form body of the precreate handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecreateRequest {
    pub path: String,
    pub size: u64,
    pub block_list: Vec<String>,
    pub content_md5: String,
    pub slice_md5: String,
}

impl PrecreateRequest {
    /// Encodes the request as form fields, in the order the service documents.
    pub fn to_form(&self) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
        Ok(vec![
            ("path", self.path.clone()),
            ("size", self.size.to_string()),
            ("isdir", "0".into()),
            ("autoinit", "1".into()),
            ("rtype", RENAME_ON_CONFLICT.into()),
            ("block_list", serde_json::to_string(&self.block_list)?),
            ("content-md5", self.content_md5.clone()),
            ("slice-md5", self.slice_md5.clone()),
        ])
    }
}

/// Form body of the commit (create) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub path: String,
    pub upload_id: String,
    pub block_list: Vec<String>,
    pub size: u64,
}

impl CommitRequest {
    pub fn to_form(&self) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
        Ok(vec![
            ("path", self.path.clone()),
            ("uploadid", self.upload_id.clone()),
            ("block_list", serde_json::to_string(&self.block_list)?),
            ("size", self.size.to_string()),
            ("isdir", "0".into()),
            ("rtype", RENAME_ON_CONFLICT.into()),
        ])
    }
}

/// Response to the precreate handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecreateResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default, rename = "uploadid")]
    pub upload_id: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub return_type: i32,
    /// Indices of blocks the service still needs.
    #[serde(default)]
    pub block_list: Vec<u32>,
    /// Stored file metadata, present on a dedup hit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<FileInfo>,
}

impl PrecreateResponse {
    /// Returns `true` if the service already holds identical content.
    pub fn is_dedup_hit(&self) -> bool {
        self.return_type == RETURN_TYPE_EXISTS
    }
}

impl ResponseStatus for PrecreateResponse {
    fn code(&self) -> i64 {
        self.status.errno
    }

    fn message(&self) -> &str {
        &self.status.errmsg
    }

    fn request_id(&self) -> u64 {
        self.status.request_id
    }
}

/// Per-chunk acknowledgement from the chunk upload endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkUploadResponse {
    #[serde(flatten)]
    pub status: PcsStatus,
    #[serde(default)]
    pub md5: String,
    #[serde(default, rename = "uploadid")]
    pub upload_id: String,
    #[serde(default, rename = "partseq", deserialize_with = "u32_from_any")]
    pub part_seq: u32,
}

impl ResponseStatus for ChunkUploadResponse {
    fn code(&self) -> i64 {
        self.status.error_code
    }

    fn message(&self) -> &str {
        &self.status.error_msg
    }

    fn request_id(&self) -> u64 {
        self.status.request_id
    }
}

// ---------------------------------------------------------------------------
// Account and metadata lookups
// ---------------------------------------------------------------------------

/// Response of the user-info endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfoResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default)]
    pub baidu_name: String,
    #[serde(default)]
    pub netdisk_name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub vip_type: i32,
    #[serde(default)]
    pub uk: u64,
}

impl ResponseStatus for UserInfoResponse {
    fn code(&self) -> i64 {
        self.status.errno
    }

    fn message(&self) -> &str {
        &self.status.errmsg
    }

    fn request_id(&self) -> u64 {
        self.status.request_id
    }
}

/// One entry of the file-metas listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub fs_id: u64,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub category: i32,
    #[serde(default)]
    pub isdir: i32,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub md5: String,
    /// Download link; only present when requested with `dlink=1`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dlink: String,
    #[serde(default)]
    pub server_ctime: i64,
    #[serde(default)]
    pub server_mtime: i64,
}

/// Response of the file-metas endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetasResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default)]
    pub list: Vec<FileMeta>,
}

impl ResponseStatus for FileMetasResponse {
    fn code(&self) -> i64 {
        self.status.errno
    }

    fn message(&self) -> &str {
        &self.status.errmsg
    }

    fn request_id(&self) -> u64 {
        self.status.request_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precreate_form_fields() {
        let req = PrecreateRequest {
            path: "/apps/a.bin".into(),
            size: 10,
            block_list: vec!["aa".into(), "bb".into()],
            content_md5: "cc".into(),
            slice_md5: "dd".into(),
        };
        let form = req.to_form().unwrap();
        let get = |k: &str| form.iter().find(|(key, _)| *key == k).unwrap().1.clone();
        assert_eq!(get("block_list"), r#"["aa","bb"]"#);
        assert_eq!(get("isdir"), "0");
        assert_eq!(get("autoinit"), "1");
        assert_eq!(get("rtype"), "1");
        assert_eq!(get("content-md5"), "cc");
        assert_eq!(get("slice-md5"), "dd");
    }

    #[test]
    fn commit_form_fields() {
        let req = CommitRequest {
            path: "/apps/a.bin".into(),
            upload_id: "u1".into(),
            block_list: vec!["aa".into()],
            size: 3,
        };
        let form = req.to_form().unwrap();
        assert!(form.contains(&("uploadid", "u1".to_string())));
        assert!(form.contains(&("block_list", r#"["aa"]"#.to_string())));
        assert!(form.contains(&("size", "3".to_string())));
    }

    #[test]
    fn precreate_dedup_hit_with_float_request_id() {
        let json = r#"{"return_type":2,"errno":0,"info":{"size":16877488,"category":4,
            "fs_id":714504460793248,"request_id":1.821160071156e+17,
            "path":"/apps/demo/deck.pptx","isdir":0,"mtime":1627288705,"ctime":1627288705,
            "md5":"44090321ds594263c8818d7c398e5017"},"request_id":182116007115598010}"#;
        let resp: PrecreateResponse = serde_json::from_str(json).unwrap();
        assert!(resp.is_ok());
        assert!(resp.is_dedup_hit());
        let info = resp.info.unwrap();
        assert_eq!(info.fs_id, 714504460793248);
        assert_eq!(info.size, 16877488);
        assert_eq!(info.status.request_id, 182116007115600000);
        assert_eq!(resp.status.request_id, 182116007115598010);
    }

    #[test]
    fn precreate_new_session() {
        let json = r#"{"errno":0,"path":"/apps/a.bin","uploadid":"N1-abc","return_type":1,
            "block_list":[0,1,2],"request_id":1}"#;
        let resp: PrecreateResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.is_dedup_hit());
        assert_eq!(resp.upload_id, "N1-abc");
        assert_eq!(resp.block_list, vec![0, 1, 2]);
        assert!(resp.info.is_none());
    }

    #[test]
    fn chunk_ack_accepts_string_and_integer_partseq() {
        let s: ChunkUploadResponse =
            serde_json::from_str(r#"{"md5":"aa","uploadid":"u","partseq":"3"}"#).unwrap();
        let i: ChunkUploadResponse =
            serde_json::from_str(r#"{"md5":"aa","uploadid":"u","partseq":3}"#).unwrap();
        assert_eq!(s.part_seq, 3);
        assert_eq!(i.part_seq, 3);
        assert!(s.is_ok());
    }

    #[test]
    fn chunk_ack_error() {
        let json = r#"{"error_code":31299,"error_msg":"invalid uploadid","request_id":"77"}"#;
        let resp: ChunkUploadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.code(), 31299);
        assert_eq!(resp.request_id(), 77);
    }

    #[test]
    fn user_info_request_id_as_string() {
        let json = r#"{"baidu_name":"n","netdisk_name":"d","vip_type":2,"uk":5,
            "errno":0,"errmsg":"succ","request_id":"8834512761823"}"#;
        let resp: UserInfoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.vip_type, 2);
        assert_eq!(resp.request_id(), 8834512761823);
    }

    #[test]
    fn file_metas_with_dlink() {
        let json = r#"{"errno":0,"errmsg":"succ","request_id":"1","list":[
            {"fs_id":759719327699432,"path":"/a/test.jpg","filename":"test.jpg",
             "size":1024,"md5":"m","dlink":"https://d.pcs.baidu.com/file/x?fid=1"}]}"#;
        let resp: FileMetasResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.list.len(), 1);
        assert_eq!(resp.list[0].dlink, "https://d.pcs.baidu.com/file/x?fid=1");
    }
}
