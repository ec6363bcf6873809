/// Party hat drawn above the photo; 120x100 artwork scaled into a 70x55 box.
pub(crate) const HAT_WIDTH: f64 = 70.0;
pub(crate) const HAT_HEIGHT: f64 = 55.0;

pub(crate) const HAT_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="70" height="55" viewBox="0 0 120 100">
<defs>
<linearGradient id="hatGradientExport" x1="0" y1="0" x2="0" y2="1">
<stop offset="0" stop-color="#FF69B4"/>
<stop offset="0.5" stop-color="#FF1493"/>
<stop offset="1" stop-color="#C71585"/>
</linearGradient>
</defs>
<path d="M 60 10 L 20 80 L 100 80 Z" fill="url(#hatGradientExport)" stroke="#FFD700" stroke-width="2"/>
<ellipse cx="60" cy="80" rx="45" ry="8" fill="#FF1493"/>
<circle cx="60" cy="10" r="8" fill="#FFD700"/>
<circle cx="60" cy="10" r="5" fill="#FFA500"/>
<circle cx="50" cy="40" r="4" fill="#FFD700" opacity="0.8"/>
<circle cx="70" cy="35" r="4" fill="#FFD700" opacity="0.8"/>
<circle cx="45" cy="60" r="4" fill="#FFD700" opacity="0.8"/>
<circle cx="75" cy="55" r="4" fill="#FFD700" opacity="0.8"/>
<circle cx="60" cy="50" r="4" fill="#FFD700" opacity="0.8"/>
</svg>"##;
