use crate::domain::model::BankEntry;
use crate::utils::error::Result;

/// 題庫來源。引擎本身不做 I/O，讀寫都經由此介面
pub trait BankStorage: Send + Sync {
    /// 可用的題庫檔名 (依名稱排序)
    fn list_banks(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    fn read_bank(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Vec<BankEntry>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// 明確指定的題庫檔；空集合代表使用資料夾中所有 `*.json`
    fn bank_files(&self) -> &[String];
    fn concurrency(&self) -> usize;
    fn seed_suffixes(&self) -> &[String];
    fn snapshot_per_file(&self) -> usize;
    fn snapshot_output(&self) -> &str;
    fn seed_prefix(&self) -> Option<&str>;
}
