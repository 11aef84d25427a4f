//! File globs shared by the built-in fragments.

pub const GLOB_SRC_EXT: &str = "?([cm])[jt]s?(x)";
pub const GLOB_SRC: &str = "**/*.?([cm])[jt]s?(x)";

pub const GLOB_JS: &str = "**/*.?([cm])js";
pub const GLOB_JSX: &str = "**/*.?([cm])jsx";
pub const GLOB_TS: &str = "**/*.?([cm])ts";
pub const GLOB_TSX: &str = "**/*.?([cm])tsx";

pub const GLOB_JSON: &str = "**/*.json";
pub const GLOB_JSON5: &str = "**/*.json5";
pub const GLOB_JSONC: &str = "**/*.jsonc";

pub const GLOB_MARKDOWN: &str = "**/*.md";
pub const GLOB_MARKDOWN_CODE: &str = "**/*.md/**/*.?([cm])[jt]s?(x)";
pub const GLOB_MARKDOWN_IN_MARKDOWN: &str = "**/*.md/*.md";

pub const GLOB_YAML: &str = "**/*.y?(a)ml";
pub const GLOB_TOML: &str = "**/*.toml";

pub const GLOB_SVELTE: &str = "**/*.svelte";
pub const GLOB_ASTRO: &str = "**/*.astro";
pub const GLOB_ASTRO_TS: &str = "**/*.astro/*.ts";

pub const GLOB_CSS: &str = "**/*.css";
pub const GLOB_POSTCSS: &str = "**/*.{p,post}css";
pub const GLOB_LESS: &str = "**/*.less";
pub const GLOB_SCSS: &str = "**/*.scss";
pub const GLOB_HTML: &str = "**/*.htm?(l)";
pub const GLOB_XML: &str = "**/*.xml";
pub const GLOB_SVG: &str = "**/*.svg";
pub const GLOB_GRAPHQL: &str = "**/*.{g,graph}ql";

pub const GLOB_PACKAGE_JSON: &str = "**/package.json";
pub const GLOB_TSCONFIG: &[&str] = &["**/tsconfig.json", "**/tsconfig.*.json"];
pub const GLOB_TURBO_JSON: &str = "**/turbo.json";
pub const GLOB_PNPM_WORKSPACE: &str = "**/pnpm-workspace.yaml";

/// Test files, derived from [`GLOB_SRC_EXT`].
pub fn glob_tests() -> Vec<String> {
    [
        "**/__tests__/**/*.",
        "**/*.spec.",
        "**/*.test.",
        "**/*.bench.",
        "**/*.benchmark.",
    ]
    .iter()
    .map(|prefix| format!("{}{}", prefix, GLOB_SRC_EXT))
    .collect()
}

/// Paths excluded from every fragment.
pub const GLOB_EXCLUDE: &[&str] = &[
    "**/node_modules",
    "**/dist",
    "**/package-lock.json",
    "**/yarn.lock",
    "**/pnpm-lock.yaml",
    "**/bun.lockb",
    "**/output",
    "**/coverage",
    "**/temp",
    "**/.temp",
    "**/tmp",
    "**/.tmp",
    "**/.history",
    "**/.vitepress/cache",
    "**/.nuxt",
    "**/.next",
    "**/.svelte-kit",
    "**/.vercel",
    "**/.changeset",
    "**/.idea",
    "**/.cache",
    "**/.output",
    "**/.vite-inspect",
    "**/.yarn",
    "**/vite.config.*.timestamp-*",
    "**/CHANGELOG*.md",
    "**/*.min.*",
    "**/LICENSE*",
    "**/__snapshots__",
    "**/auto-import?(s).d.ts",
    "**/components.d.ts",
];

/// Source globs for a list of extra component extensions, e.g. `vue` -> `**/*.vue`.
pub fn component_globs(exts: &[String]) -> Vec<String> {
    exts.iter().map(|ext| format!("**/*.{}", ext)).collect()
}
