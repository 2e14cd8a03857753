//! 単一実行フラグ
//!
//! 解析とレポート生成はそれぞれ同時に1つまで。
//! ガードの drop でフラグを戻すので、途中キャンセル（future の drop）でも解放される。

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct BusyFlag {
    busy: AtomicBool,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// 空いていればフラグを立ててガードを返す
    pub fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard { flag: &self.busy })
    }
}

#[derive(Debug)]
pub struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_drop() {
        let flag = BusyFlag::new();
        let guard = flag.try_acquire();
        assert!(guard.is_some());
        assert!(flag.is_busy());
        assert!(flag.try_acquire().is_none());

        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_acquire().is_some());
    }
}
