//! The single HTML page: controls form plus status panel.

use rad10_proto::protocol::{
    Preset, StatusSnapshot, TOGGLE_BUTTON, VOL_DOWN_BUTTON, VOL_UP_BUTTON,
};
use std::fmt::Write;

use htmlescape::{encode_attribute, encode_minimal};

pub fn render(presets: &[Preset], status: &StatusSnapshot) -> String {
    let mut html = String::with_capacity(2048);

    html.push_str(
        r#"<!DOCTYPE html>
<html>
	<head>
		<meta name="viewport" content="width=device-width" />
		<title>rad10</title>
		<link href="/css/style.css" type="text/css" rel="stylesheet" />
	</head>
	<body>
		<center><h1>rad10</h1>
			<form method="get" action="/">
"#,
    );

    let _ = writeln!(
        html,
        r#"				<input type="image" class="large_button" src="images/toggle.png" alt="play/pause" name="{}" />
				<br />
				<input type="image" class="small_button" src="images/minus.png" alt="volume down" name="{}" />
				<input type="image" class="small_button" src="images/plus.png" alt="volume up" name="{}" />
				<br />
				<h2>presets</h2>"#,
        TOGGLE_BUTTON, VOL_DOWN_BUTTON, VOL_UP_BUTTON
    );

    for preset in presets {
        // ids are limited to [A-Za-z0-9_-], so this only guards the markup
        let id = encode_minimal(&preset.id);
        let _ = writeln!(
            html,
            r#"				<input type="submit" class="text_button" value="{id}" name="{id}" />
				<br />"#
        );
    }

    html.push_str("\t\t\t</form>\n");

    let _ = writeln!(
        html,
        r#"			<div class="status">
				<div class="now_playing">{}</div>
				<div class="status_row"><span class="transport">{}</span> <span class="volume">{}</span></div>"#,
        encode_minimal(&status.now_playing),
        encode_minimal(&status.transport),
        encode_minimal(&status.volume),
    );

    if let Some(reason) = &status.unavailable {
        let _ = writeln!(
            html,
            r#"				<div class="unavailable" title="{}">controller unavailable</div>"#,
            encode_attribute(reason)
        );
    }

    html.push_str("\t\t\t</div>\n\t\t</center>\n\t</body>\n</html>\n");
    html
}
