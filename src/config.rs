use std::env;
use std::sync::OnceLock;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub public_origin: Url,
    pub admin_username: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            eprintln!("WARNING: JWT_SECRET not set in .env, using default (insecure!)");
            "secret".to_string()
        });

        // Origin used when building share URLs (<origin>/shared/<slug>)
        let public_origin = env::var("PUBLIC_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let public_origin = Url::parse(&public_origin).expect("PUBLIC_ORIGIN must be a valid URL");

        let admin_username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
            eprintln!("WARNING: ADMIN_PASSWORD not set in .env, using default (insecure!)");
            "admin".to_string()
        });

        Self {
            bind_addr,
            jwt_secret,
            public_origin,
            admin_username,
            admin_password,
        }
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}
