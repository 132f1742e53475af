//! Translation of [`EngineOptions`] into yt-dlp command-line arguments.

use tubegate_core::EngineOptions;

/// Arguments shared by every invocation.
fn option_args(options: &EngineOptions) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(format) = &options.format {
        args.push("--format".to_string());
        args.push(format.clone());
    }
    if !options.format_sort.is_empty() {
        args.push("--format-sort".to_string());
        args.push(options.format_sort.join(","));
    }
    if let Some(timeout) = options.socket_timeout_secs {
        args.push("--socket-timeout".to_string());
        args.push(timeout.to_string());
    }
    if let Some(retries) = options.retries {
        args.push("--retries".to_string());
        args.push(retries.to_string());
    }
    if let Some(retries) = options.fragment_retries {
        args.push("--fragment-retries".to_string());
        args.push(retries.to_string());
    }
    match options.skip_unavailable_fragments {
        Some(true) => args.push("--skip-unavailable-fragments".to_string()),
        Some(false) => args.push("--abort-on-unavailable-fragments".to_string()),
        None => {}
    }
    if let Some(country) = &options.geo_bypass_country {
        args.push("--geo-bypass-country".to_string());
        args.push(country.clone());
    }
    if let Some(path) = &options.cookies_file {
        args.push("--cookies".to_string());
        args.push(path.to_string_lossy().to_string());
    } else if let Some(browser) = &options.cookies_from_browser {
        args.push("--cookies-from-browser".to_string());
        args.push(browser.clone());
    }
    if let Some(proxy) = &options.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }
    if options.keep_video {
        args.push("--keep-video".to_string());
    }
    if options.overwrites {
        args.push("--force-overwrites".to_string());
    }
    if options.flat {
        args.push("--flat-playlist".to_string());
    }

    args.extend(options.extra_args.iter().cloned());
    args
}

/// Arguments for metadata-only extraction.
pub fn info_args(url: &str, options: &EngineOptions) -> Vec<String> {
    let mut args = vec![
        "--dump-single-json".to_string(),
        "--no-playlist".to_string(),
        "--quiet".to_string(),
        "--no-warnings".to_string(),
    ];
    args.extend(option_args(options));
    args.push("--".to_string());
    args.push(url.to_string());
    args
}

/// Arguments for a download that prints the final file path on stdout.
pub fn download_args(
    url: &str,
    format_id: &str,
    output_template: &str,
    options: &EngineOptions,
) -> Vec<String> {
    let mut args = vec![
        "--no-playlist".to_string(),
        "--quiet".to_string(),
        "--no-warnings".to_string(),
        "--no-progress".to_string(),
        "--no-simulate".to_string(),
        "--print".to_string(),
        "after_move:filepath".to_string(),
    ];

    // The requested rendition wins over any configured selector.
    let options = EngineOptions {
        format: Some(format_id.to_string()),
        ..options.clone()
    };
    args.extend(option_args(&options));

    args.push("--output".to_string());
    args.push(output_template.to_string());
    args.push("--".to_string());
    args.push(url.to_string());
    args
}
