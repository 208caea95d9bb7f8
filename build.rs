use std::env;

fn main() {
    // 告诉 cargo 在 build.rs 变化时重新运行
    println!("cargo:rerun-if-changed=build.rs");

    // 主机端测试不需要链接脚本
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    if target_arch != "xtensa" {
        return;
    }

    // esp-hal 1.0 的链接脚本只作用于固件二进制
    println!("cargo:rustc-link-arg-bins=-Tlinkall.x");

    // 添加 ld 目录到链接路径（如果有自定义链接脚本）
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        println!("cargo:rustc-link-search={}/ld", manifest_dir);
    }
}
