use anyhow::{Context, Result};
use dts::process::url::parse;
use dts::structs::url::ParsedUrl;
use serde::Serialize;

use super::command::{OutputFormat, UrlArgs};

#[derive(Debug, Serialize)]
struct UrlInfo<'a> {
    proto: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    host: &'a str,
    ipv6: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    path: &'a str,
    url: String,
}

impl<'a> From<&'a ParsedUrl> for UrlInfo<'a> {
    fn from(url: &'a ParsedUrl) -> Self {
        Self {
            proto: &url.proto,
            user: url.user.as_deref(),
            password: url.password.as_deref(),
            host: &url.host,
            ipv6: url.is_ipv6(),
            port: (url.port != 0).then_some(url.port),
            path: &url.path,
            url: url.to_string(),
        }
    }
}

pub fn cmd_url(args: &UrlArgs) -> Result<()> {
    let parsed = parse(&args.url).with_context(|| format!("Malformed URL: {}", args.url))?;
    let info = UrlInfo::from(&parsed);

    match args.format {
        OutputFormat::Text => display_url_info(&info),
        OutputFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&info)?),
    }

    Ok(())
}

fn display_url_info(info: &UrlInfo) {
    println!("Protocol                    {}", info.proto);
    if let Some(user) = info.user {
        println!("User                        {user}");
    }
    if let Some(password) = info.password {
        println!("Password                    {password}");
    }
    println!("Host                        {}", info.host);
    if let Some(port) = info.port {
        println!("Port                        {port}");
    }
    println!("Path                        {}", info.path);
    println!("Normalized                  {}", info.url);
}
