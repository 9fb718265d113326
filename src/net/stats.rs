//! 统计信息

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    /// 路由器发出的协议控制包
    pub control_pkts: u64,
    /// 路由器转发的 traceroute 包
    pub traces_forwarded: u64,
    /// 客户端发出的 traceroute 包
    pub traces_sent: u64,
    /// 到达目的客户端的 traceroute 包
    pub traces_delivered: u64,
    /// 发往未挂接端口或已拆除链路而被丢弃的包
    pub dropped_pkts: u64,
}
