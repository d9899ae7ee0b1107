fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use panxfer_protocol::{
        AccountTier, ChunkUploadResponse, FileInfo, FileMetasResponse, PrecreateResponse,
        ResponseStatus, UserInfoResponse,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    fn decode<T: serde::de::DeserializeOwned>(name: &str) -> T {
        serde_json::from_value(load_fixture(name))
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values. Only valid for fixtures already in canonical form.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  service: {fixture}\n  rust:    {reserialized}"
        );
    }

    // --- Upload handshake ---

    #[test]
    fn fixture_precreate_new_session() {
        roundtrip_test::<PrecreateResponse>("precreate_new_session.json");

        let resp: PrecreateResponse = decode("precreate_new_session.json");
        assert!(!resp.is_dedup_hit());
        assert!(resp.upload_id.starts_with("N1-"));
        assert_eq!(resp.block_list, vec![0, 1, 2]);
        assert!(resp.info.is_none());
    }

    #[test]
    fn precreate_dedup_hit_with_float_request_id() {
        let resp: PrecreateResponse = decode("precreate_dedup_hit.json");
        assert!(resp.is_dedup_hit());
        assert_eq!(resp.code(), 0);
        assert!(resp.upload_id.is_empty());

        let info = resp.info.expect("dedup hit carries file info");
        assert_eq!(info.status.request_id, 200_000_000_000_000_000);
        assert_eq!(info.fs_id, 714504460793248);
        assert_eq!(info.size, 10_485_760);
        assert_eq!(info.md5, "0d9bbdc1ae1f5e5a8e3ad4c5e2a1b0f7");
    }

    #[test]
    fn chunk_ack_with_string_fields() {
        let ack: ChunkUploadResponse = decode("chunk_ack.json");
        assert_eq!(ack.code(), 0);
        assert_eq!(ack.part_seq, 1);
        assert_eq!(ack.request_id(), 8911520312917395461);
        assert_eq!(ack.md5, "b8e8a9d3f1c34d0e9a1f2c6b7d5e4f30");
    }

    #[test]
    fn chunk_error_uses_pcs_convention() {
        let ack: ChunkUploadResponse = decode("chunk_error.json");
        assert_eq!(ack.code(), 31363);
        assert_eq!(ack.message(), "block miss in superfile2");
        assert!(ack.md5.is_empty());
    }

    #[test]
    fn fixture_create_response() {
        roundtrip_test::<FileInfo>("create_response.json");

        let info: FileInfo = decode("create_response.json");
        assert_eq!(info.fs_id, 714504460793249);
        assert_eq!(info.path, "/apps/demo/archive.bin");
    }

    #[test]
    fn api_error_decodes_into_any_xpan_response() {
        let precreate: PrecreateResponse = decode("api_error.json");
        assert_eq!(precreate.code(), -7);
        assert_eq!(precreate.message(), "file name is illegal");

        let info: FileInfo = decode("api_error.json");
        assert_eq!(info.code(), -7);
        assert_eq!(info.request_id(), 8954319183542170002);
    }

    // --- Account and metadata lookups ---

    #[test]
    fn fixture_user_info() {
        roundtrip_test::<UserInfoResponse>("user_info.json");

        let user: UserInfoResponse = decode("user_info.json");
        assert_eq!(AccountTier::from_vip_type(user.vip_type), AccountTier::SuperVip);
    }

    #[test]
    fn fixture_file_metas() {
        roundtrip_test::<FileMetasResponse>("file_metas.json");

        let metas: FileMetasResponse = decode("file_metas.json");
        assert_eq!(metas.list.len(), 1);
        assert!(metas.list[0].dlink.starts_with("https://d.pcs.baidu.com/file/"));
    }

    #[test]
    fn file_meta_without_dlink_omits_it() {
        let json = r#"{"fs_id": 1, "path": "/apps/demo/a", "size": 3}"#;
        let meta: panxfer_protocol::FileMeta = serde_json::from_str(json).unwrap();
        assert!(meta.dlink.is_empty());

        let value = serde_json::to_value(&meta).unwrap();
        assert!(value.get("dlink").is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{
            "errno": 0,
            "request_id": 1,
            "path": "/apps/demo/a",
            "size": 3,
            "category": 6,
            "server_filename": "a",
            "name": "/apps/demo/a",
            "fs_id": 5
        }"#;
        let info: FileInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.fs_id, 5);
        assert_eq!(info.size, 3);
    }
}
