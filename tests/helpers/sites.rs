use cms_mcp::ServerConfig;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// On-disk sites root for one test.
pub struct SiteFixture {
    dir: TempDir,
}

impl SiteFixture {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("create temp sites root"),
        }
    }

    /// `default` and `shop.test`, each with a couple of records.
    pub fn standard() -> Self {
        let fixture = Self::empty();

        fixture.site("default", "Default Site");
        fixture.collection(
            "default",
            "pages",
            json!([
                { "id": "home", "title": "Home", "slug": "home", "status": "published", "content": "Welcome home" },
                { "id": "about", "title": "About Us", "slug": "about-us", "status": "draft", "content": "Who we are" }
            ]),
        );
        fixture.collection(
            "default",
            "menus",
            json!([{ "id": "main", "items": ["home", "about"] }]),
        );

        fixture.site("shop.test", "Shop");
        fixture.collection(
            "shop.test",
            "pages",
            json!([
                { "id": "cart", "title": "Cart", "slug": "cart", "status": "published", "content": "Your cart" }
            ]),
        );
        fixture.collection(
            "shop.test",
            "users",
            json!([
                { "id": "u1", "name": "Ada", "password_hash": "secret", "api_token": "tok" }
            ]),
        );

        fixture
    }

    pub fn site(&self, domain: &str, name: &str) {
        let dir = self.dir.path().join(domain);
        std::fs::create_dir_all(&dir).expect("create site dir");
        std::fs::write(dir.join("site.json"), json!({ "name": name }).to_string())
            .expect("write manifest");
    }

    pub fn collection(&self, domain: &str, collection: &str, records: Value) {
        let path = self.dir.path().join(domain).join(format!("{}.json", collection));
        std::fs::write(path, records.to_string()).expect("write collection");
    }

    pub fn read_collection(&self, domain: &str, collection: &str) -> Value {
        let path = self.dir.path().join(domain).join(format!("{}.json", collection));
        let raw = std::fs::read_to_string(path).expect("read collection");
        serde_json::from_str(&raw).expect("collection is JSON")
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn root_buf(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn config(&self) -> ServerConfig {
        ServerConfig {
            sites_root: self.root_buf(),
            ..ServerConfig::default()
        }
    }
}
