// ==========================================
// E-Claim 对账核心 - 领域类型定义
// ==========================================
// 职责: 文件类型/模式变体/导入状态/对账状态等枚举
// 约定: 数据库中统一存储 as_str() 的小写文本
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 理赔文件类型 (File Type)
// ==========================================
// 来源: 文件名中的类型段 eclaim_{hcode}_{TYPE}_{date}_{seq}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    Op,    // UCS 门诊
    Ip,    // UCS 住院
    Orf,   // UCS 转诊门诊
    OpLgo, // 地方政府 门诊
    IpLgo, // 地方政府 住院
    OpSss, // 社保 门诊
    IpSss, // 社保 住院
}

impl FileType {
    pub const ALL: [FileType; 7] = [
        FileType::Op,
        FileType::Ip,
        FileType::Orf,
        FileType::OpLgo,
        FileType::IpLgo,
        FileType::OpSss,
        FileType::IpSss,
    ];

    /// 文件名中的类型段
    pub fn token(&self) -> &'static str {
        match self {
            FileType::Op => "OP",
            FileType::Ip => "IP",
            FileType::Orf => "ORF",
            FileType::OpLgo => "OPLGO",
            FileType::IpLgo => "IPLGO",
            FileType::OpSss => "OPSSS",
            FileType::IpSss => "IPSSS",
        }
    }

    /// 从类型段解析（大小写不敏感）
    pub fn from_token(token: &str) -> Option<Self> {
        let upper = token.trim().to_uppercase();
        FileType::ALL.into_iter().find(|t| t.token() == upper)
    }

    /// 行级 scheme 标记（多个变体共用 claim_rep 表）
    pub fn scheme_code(&self) -> &'static str {
        match self {
            FileType::Op | FileType::Ip | FileType::Orf => "UCS",
            FileType::OpLgo | FileType::IpLgo => "LGO",
            FileType::OpSss | FileType::IpSss => "SSS",
        }
    }

    /// 选择字段映射表
    pub fn schema_variant(&self) -> SchemaVariant {
        match self {
            FileType::Op => SchemaVariant::UcsOp,
            FileType::Ip => SchemaVariant::UcsIp,
            FileType::Orf => SchemaVariant::Orf,
            FileType::OpLgo | FileType::IpLgo => SchemaVariant::Lgo,
            FileType::OpSss | FileType::IpSss => SchemaVariant::Sss,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

// ==========================================
// 报表模式变体 (Schema Variant)
// ==========================================
// 五套静态映射表，一个变体一张
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    UcsOp,
    UcsIp,
    Orf,
    Lgo,
    Sss,
}

impl SchemaVariant {
    pub const ALL: [SchemaVariant; 5] = [
        SchemaVariant::UcsOp,
        SchemaVariant::UcsIp,
        SchemaVariant::Orf,
        SchemaVariant::Lgo,
        SchemaVariant::Sss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVariant::UcsOp => "ucs_op",
            SchemaVariant::UcsIp => "ucs_ip",
            SchemaVariant::Orf => "orf",
            SchemaVariant::Lgo => "lgo",
            SchemaVariant::Sss => "sss",
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 导入状态 (Import Status)
// ==========================================
// 终态: completed / failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Pending => "pending",
            ImportStatus::Processing => "processing",
            ImportStatus::Completed => "completed",
            ImportStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "pending" => Some(ImportStatus::Pending),
            "processing" => Some(ImportStatus::Processing),
            "completed" => Some(ImportStatus::Completed),
            "failed" => Some(ImportStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportStatus::Completed | ImportStatus::Failed)
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 结算单数据段 (Data Type)
// ==========================================
// 由分段标记行切换: 正常 / 申诉 / 残障(D1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Normal,
    Appeal,
    Disabled,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Normal => "normal",
            DataType::Appeal => "appeal",
            DataType::Disabled => "disabled",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 对账状态 (Reconciliation Status)
// ==========================================
// 三态: 一致 / 金额不符 / 单边缺失（按比对对象区分缺哪一边）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconStatus {
    Matched,
    AmountDiffers,
    ClaimMissing,   // 结算单有、理赔无
    ClaimOnly,      // 理赔批次无任何结算记录
    StatementOnly,  // 结算有、国库拨付无
    TransferOnly,   // 国库拨付有、结算无
}

impl ReconStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconStatus::Matched => "matched",
            ReconStatus::AmountDiffers => "amount_differs",
            ReconStatus::ClaimMissing => "claim_missing",
            ReconStatus::ClaimOnly => "claim_only",
            ReconStatus::StatementOnly => "statement_only",
            ReconStatus::TransferOnly => "transfer_only",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "matched" => Some(ReconStatus::Matched),
            "amount_differs" => Some(ReconStatus::AmountDiffers),
            "claim_missing" => Some(ReconStatus::ClaimMissing),
            "claim_only" => Some(ReconStatus::ClaimOnly),
            "statement_only" => Some(ReconStatus::StatementOnly),
            "transfer_only" => Some(ReconStatus::TransferOnly),
            _ => None,
        }
    }
}

impl fmt::Display for ReconStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 结算单险种 (Statement Scheme)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementScheme {
    Ucs,
    Ofc,
    Sss,
    Lgo,
}

impl StatementScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementScheme::Ucs => "UCS",
            StatementScheme::Ofc => "OFC",
            StatementScheme::Sss => "SSS",
            StatementScheme::Lgo => "LGO",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_uppercase().as_str() {
            "UCS" => Some(StatementScheme::Ucs),
            "OFC" => Some(StatementScheme::Ofc),
            "SSS" => Some(StatementScheme::Sss),
            "LGO" => Some(StatementScheme::Lgo),
            _ => None,
        }
    }
}

impl fmt::Display for StatementScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 患者类别 (Patient Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PatientKind {
    Ip,
    Op,
}

impl PatientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientKind::Ip => "IP",
            PatientKind::Op => "OP",
        }
    }
}

// ==========================================
// 结算汇总类别 (Summary Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    Receivable, // 应收汇总
    Rep,        // REP 批次汇总
}

impl SummaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryKind::Receivable => "receivable",
            SummaryKind::Rep => "rep",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_token_roundtrip_case_insensitive() {
        assert_eq!(FileType::from_token("oplgo"), Some(FileType::OpLgo));
        assert_eq!(FileType::from_token(" IP "), Some(FileType::Ip));
        assert_eq!(FileType::from_token("XYZ"), None);
    }

    #[test]
    fn test_file_type_variant_selection() {
        assert_eq!(FileType::OpSss.schema_variant(), SchemaVariant::Sss);
        assert_eq!(FileType::IpSss.schema_variant(), SchemaVariant::Sss);
        assert_eq!(FileType::IpLgo.schema_variant(), SchemaVariant::Lgo);
        assert_eq!(FileType::Orf.scheme_code(), "UCS");
    }

    #[test]
    fn test_import_status_terminal() {
        assert!(ImportStatus::Completed.is_terminal());
        assert!(ImportStatus::Failed.is_terminal());
        assert!(!ImportStatus::Processing.is_terminal());
        assert_eq!(ImportStatus::parse("failed"), Some(ImportStatus::Failed));
    }
}
